use crate::config::AppConfig;
use driver::database::PostgresDatabase;
use kernel::KernelError;
use std::ops::Deref;
use std::sync::Arc;
use vodca::References;

#[derive(Clone)]
pub struct AppModule(Arc<Handler>);

impl AppModule {
    pub async fn new(config: AppConfig) -> error_stack::Result<Self, KernelError> {
        Ok(Self(Arc::new(Handler::init(config).await?)))
    }
}

impl Deref for AppModule {
    type Target = Handler;
    fn deref(&self) -> &Self::Target {
        Deref::deref(&self.0)
    }
}

#[derive(References)]
pub struct Handler {
    pgpool: PostgresDatabase,
    config: AppConfig,
}

impl Handler {
    pub async fn init(config: AppConfig) -> error_stack::Result<Self, KernelError> {
        let pgpool = PostgresDatabase::new().await?;
        pgpool.migrate().await?;

        Ok(Self { pgpool, config })
    }
}
