mod request;
mod response;

use application::service::{BorrowService, GetLoanService, ReturnService};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use self::request::{BorrowRequest, GetAllRequest, GetRequest, ReturnRequest, Transformer};
use self::response::Presenter;
use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extractor::Actor;
use crate::handler::AppModule;
use crate::route::{created, found_or_404};

pub trait LoanRouter {
    fn route_loan(self) -> Self;
}

impl LoanRouter for Router<AppModule> {
    fn route_loan(self) -> Self {
        self.route(
            "/loans",
            get(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Query(req): Query<GetAllRequest>| async move {
                    Controller::new(Transformer::new(module.config().default_loan_duration), Presenter)
                        .try_intake(req)?
                        .handle(|dto| async move { module.pgpool().get_loans(&actor, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/loans/borrow",
            post(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Json(req): Json<BorrowRequest>| async move {
                    Controller::new(Transformer::new(module.config().default_loan_duration), Presenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().borrow_book(&actor, dto).await })
                        .await
                        .map(created)
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/loans/return",
            post(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Json(req): Json<ReturnRequest>| async move {
                    Controller::new(Transformer::new(module.config().default_loan_duration), Presenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().return_book(&actor, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/loans/:id",
            get(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Path(id): Path<Uuid>| async move {
                    Controller::new(Transformer::new(module.config().default_loan_duration), Presenter)
                        .intake(GetRequest::new(id))
                        .handle(|dto| async move { module.pgpool().get_loan(&actor, dto).await })
                        .await
                        .map(found_or_404)
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
