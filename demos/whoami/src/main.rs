//! Signs in, asks the server who we are, calls one endpoint, signs out.
//!
//! ```text
//! AUTHWIRE_BASE_URL=http://localhost:3000/api/v1 \
//! AUTHWIRE_USERNAME=ada AUTHWIRE_PASSWORD=secret \
//!     cargo run -p whoami -- /projects
//! ```

use authwire::prelude::*;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

struct Settings {
    base_url: String,
    username: String,
    password: String,
    /// Endpoint called once signed in.
    path: String,
}

impl Settings {
    /// Reads settings from `lookup` (the environment, in `main`) and the
    /// first command-line argument.
    fn load(
        lookup: impl Fn(&str) -> Option<String>,
        path: Option<String>,
    ) -> Result<Self, String> {
        let required = |name: &str| lookup(name).ok_or_else(|| format!("{name} is not set"));

        Ok(Self {
            base_url: lookup("AUTHWIRE_BASE_URL")
                .unwrap_or_else(|| ClientConfig::default().base_url),
            username: required("AUTHWIRE_USERNAME")?,
            password: required("AUTHWIRE_PASSWORD")?,
            path: path.unwrap_or_else(|| "/auth/me".to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    authwire::telemetry::init();

    let settings = Settings::load(|name| std::env::var(name).ok(), std::env::args().nth(1))?;
    let authwire = Authwire::builder().base_url(&settings.base_url).build()?;
    let session = authwire.session();

    if let Some(user) = session.fetch_current_session().await {
        tracing::info!(%user, "already signed in");
    }

    let user = session.login(&settings.username, &settings.password).await?;
    println!("signed in as {user} [{}]", user.role);

    let outcome = authwire.client().get(&settings.path).await;
    match &outcome {
        Ok(response) => println!("GET {} -> {}\n{}", settings.path, response.status, response.text()),
        Err(err) => eprintln!("GET {} failed: {}", settings.path, err.user_message()),
    }

    session.logout().await?;
    println!("signed out");

    outcome.map(|_| ()).map_err(Into::into)
}
