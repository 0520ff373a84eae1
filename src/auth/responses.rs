use serde::Deserialize;

/// JSON printed by `sf org display --json` / `sfdx force:org:display --json`.
#[derive(Debug, Deserialize)]
pub struct OrgDisplayResponse {
    #[serde(default)]
    pub result: Option<OrgDisplayResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgDisplayResult {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub instance_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl std::fmt::Debug for OrgDisplayResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgDisplayResult")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("instance_url", &self.instance_url)
            .field("username", &self.username)
            .finish()
    }
}
