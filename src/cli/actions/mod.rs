pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        admin_email: Option<String>,
        admin_password: Option<SecretString>,
    },
}
