use anyhow::{anyhow, Result};
use chatdesk_session::{Credential, CredentialPersistence};
use web_sys::Storage;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const TOKEN_TYPE_KEY: &str = "token_type";

/// Keeps the credential in `localStorage` under the three token keys
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStoragePersistence;

impl LocalStoragePersistence {
    fn storage(&self) -> Result<Storage> {
        web_sys::window()
            .ok_or_else(|| anyhow!("No window object"))?
            .local_storage()
            .map_err(|e| anyhow!("localStorage unavailable: {:?}", e))?
            .ok_or_else(|| anyhow!("localStorage unavailable"))
    }
}

fn js_err(e: wasm_bindgen::JsValue) -> anyhow::Error {
    anyhow!("localStorage error: {:?}", e)
}

impl CredentialPersistence for LocalStoragePersistence {
    fn load(&self) -> Result<Option<Credential>> {
        let storage = self.storage()?;
        let Some(access_token) = storage
            .get_item(ACCESS_TOKEN_KEY)
            .map_err(js_err)?
            .filter(|token| !token.is_empty())
        else {
            return Ok(None);
        };

        let mut credential = Credential::bearer(access_token);
        credential.refresh_token = storage.get_item(REFRESH_TOKEN_KEY).map_err(js_err)?;
        if let Some(token_type) = storage.get_item(TOKEN_TYPE_KEY).map_err(js_err)? {
            credential.token_type = token_type;
        }
        Ok(Some(credential))
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        let storage = self.storage()?;
        storage
            .set_item(ACCESS_TOKEN_KEY, &credential.access_token)
            .map_err(js_err)?;
        match &credential.refresh_token {
            Some(token) => storage.set_item(REFRESH_TOKEN_KEY, token).map_err(js_err)?,
            None => storage.remove_item(REFRESH_TOKEN_KEY).map_err(js_err)?,
        }
        storage
            .set_item(TOKEN_TYPE_KEY, &credential.token_type)
            .map_err(js_err)
    }

    fn remove(&self) -> Result<()> {
        let storage = self.storage()?;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_TYPE_KEY] {
            storage.remove_item(key).map_err(js_err)?;
        }
        Ok(())
    }
}
