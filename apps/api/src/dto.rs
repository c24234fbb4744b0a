mod bills;
mod common;
mod credentials;
mod permissions;

pub use bills::{
    BillDetailResponse, BillListItemResponse, BillListQueryRequest, BillResponse,
    CreateBillRequest, UpdateBillRequest,
};
pub use common::{HealthResponse, MeResponse};
pub use credentials::{CredentialsRequest, CredentialsResponse};
pub use permissions::{GrantPermissionRequest, GrantSummaryResponse, PermissionGrantResponse};
