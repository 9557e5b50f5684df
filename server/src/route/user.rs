mod request;
mod response;

use application::service::{
    DeleteUserService, GetUserService, RegisterUserService, UpdateUserService,
};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use self::request::{
    CreateRequest, DeleteRequest, GetAllRequest, GetRequest, Transformer, UpdateRequest,
};
use self::response::Presenter;
use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extractor::Actor;
use crate::handler::AppModule;
use crate::route::{created, found_or_404};

pub trait UserRouter {
    fn route_user(self) -> Self;
}

impl UserRouter for Router<AppModule> {
    fn route_user(self) -> Self {
        self.route(
            "/users",
            get(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Query(req): Query<GetAllRequest>| async move {
                    Controller::new(Transformer, Presenter)
                        .try_intake(req)?
                        .handle(|dto| async move { module.pgpool().get_users(&actor, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Json(req): Json<CreateRequest>| async move {
                    Controller::new(Transformer, Presenter)
                        .try_intake(req)?
                        .handle(|dto| async move { module.pgpool().register_user(&actor, dto).await })
                        .await
                        .map(created)
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/users/me",
            get(
                |State(module): State<AppModule>, Actor(actor): Actor| async move {
                    let id = *actor.require_identity()?.as_ref();
                    Controller::new(Transformer, Presenter)
                        .intake(GetRequest::new(id))
                        .handle(|dto| async move { module.pgpool().get_user(&actor, dto).await })
                        .await
                        .map(found_or_404)
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/users/:id",
            get(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Path(id): Path<Uuid>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake(GetRequest::new(id))
                        .handle(|dto| async move { module.pgpool().get_user(&actor, dto).await })
                        .await
                        .map(found_or_404)
                        .map_err(ErrorStatus::from)
                },
            )
            .put(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Path(id): Path<Uuid>,
                 Json(req): Json<UpdateRequest>| async move {
                    Controller::new(Transformer, Presenter)
                        .try_intake((id, req))?
                        .handle(|dto| async move { module.pgpool().update_user(&actor, dto).await })
                        .await
                        .map(found_or_404)
                        .map_err(ErrorStatus::from)
                },
            )
            .delete(
                |State(module): State<AppModule>,
                 Actor(actor): Actor,
                 Path(id): Path<Uuid>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake(DeleteRequest::new(id))
                        .handle(|dto| async move { module.pgpool().delete_user(&actor, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
