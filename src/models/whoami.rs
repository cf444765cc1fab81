use crate::mondo::types::MondoWhoAmI;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhoAmI {
    pub authenticated: bool,
    pub client_id: Option<String>,
    pub user_id: Option<String>,
}

impl From<MondoWhoAmI> for WhoAmI {
    fn from(mondo: MondoWhoAmI) -> Self {
        WhoAmI {
            authenticated: mondo.authenticated,
            client_id: mondo.client_id,
            user_id: mondo.user_id,
        }
    }
}
