// App-scoped user queries.

use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::models::Meta;

impl Client {
    /// Ids of every user who has authorized the current app, in the
    /// order the server reports them.
    ///
    /// `GET /apps/me/users/ids`
    pub async fn authenticated_ids(&self) -> Result<(Meta, Vec<String>), Error> {
        debug!("fetching authorized user ids");
        self.get("/apps/me/users/ids".to_owned()).await
    }
}
