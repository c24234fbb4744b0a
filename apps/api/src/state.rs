use hearth_application::{AccessControlService, BillService, CredentialService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_control_service: AccessControlService,
    pub credential_service: CredentialService,
    pub bill_service: BillService,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
