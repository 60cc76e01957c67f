use crate::api::{self, AdminBootstrap};
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            admin_email,
            admin_password,
        } => {
            let bootstrap = admin_email
                .zip(admin_password)
                .map(|(email, password)| AdminBootstrap { email, password });

            api::new(port, dsn, bootstrap).await?;
        }
    }

    Ok(())
}
