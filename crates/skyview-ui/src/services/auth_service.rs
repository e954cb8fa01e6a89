//! Auth backend: login, signup and logout against the identity gateway.
//! Provider calls run off the UI thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use skyview_auth::{AuthError, IdentityGateway, IdentityProvider, User};
use tokio::runtime::Handle;

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum AuthServiceMessage {
    LoginDone(Result<User, AuthError>),
    SignupDone(Result<User, AuthError>),
    /// Logout always completes locally
    LogoutDone,
}

fn send(tx: &Sender<AuthServiceMessage>, msg: AuthServiceMessage) {
    if tx.send(msg).is_err() {
        tracing::debug!("Auth result has no receiver");
    }
}

/// Request a password login. Sends `LoginDone` when complete.
pub fn request_login<P: IdentityProvider>(
    tx: &Sender<AuthServiceMessage>,
    runtime: &Handle,
    gateway: Arc<IdentityGateway<P>>,
    email: String,
    password: String,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = gateway.login(&email, &password).await;
        send(&tx, AuthServiceMessage::LoginDone(result));
    });
}

/// Request account registration. Sends `SignupDone` when complete.
pub fn request_signup<P: IdentityProvider>(
    tx: &Sender<AuthServiceMessage>,
    runtime: &Handle,
    gateway: Arc<IdentityGateway<P>>,
    name: String,
    email: String,
    password: String,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = gateway.signup(&name, &email, &password).await;
        send(&tx, AuthServiceMessage::SignupDone(result));
    });
}

/// Request logout. Sends `LogoutDone` once the local session is cleared.
pub fn request_logout<P: IdentityProvider>(
    tx: &Sender<AuthServiceMessage>,
    runtime: &Handle,
    gateway: Arc<IdentityGateway<P>>,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        gateway.logout().await;
        send(&tx, AuthServiceMessage::LogoutDone);
    });
}
