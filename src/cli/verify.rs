//! CLI handlers for `verify` and `mode`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::oneshot;

use super::{ModeArgs, VerifyArgs};
use crate::auth::{
    AuthContext, AuthResult, AuthenticationService, Authenticator, SessionInfo, Token, Verdict,
};
use crate::config::EndpointAuthConfig;

/// Authenticator backed by a fixed token -> session table.
struct TableAuthenticator {
    sessions: HashMap<String, String>,
}

impl Authenticator for TableAuthenticator {
    fn authenticate(&self, _context: &AuthContext, token: &Token) -> Verdict {
        token
            .as_str()
            .and_then(|token| self.sessions.get(token))
            .map(|session| SessionInfo::from(session.as_str()))
            .into()
    }
}

fn resolve_config(
    config_path: Option<&Path>,
    token: Option<String>,
) -> crate::error::Result<EndpointAuthConfig> {
    let loaded = EndpointAuthConfig::load(config_path)?;
    Ok(loaded.overlay(EndpointAuthConfig { token }))
}

/// Handle `authbridge mode`.
pub fn handle_mode(
    config_path: Option<&Path>,
    args: ModeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(config_path, args.token)?;
    println!("{}", config.mode(args.callback));
    Ok(())
}

/// Handle `authbridge verify`.
///
/// Submits every token before waiting on any of them, then prints outcomes in
/// submission order. Returns an error if any token failed.
pub async fn handle_verify(
    config_path: Option<&Path>,
    args: VerifyArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(config_path, args.token)?;
    let callback: Option<Arc<dyn Authenticator>> = if args.accept.is_empty() {
        None
    } else {
        Some(Arc::new(TableAuthenticator {
            sessions: args.accept.into_iter().collect(),
        }))
    };

    let Some(service) = config.build_service(callback)? else {
        for token in &args.tokens {
            println!("{token}: accepted (authentication disabled)");
        }
        return Ok(());
    };

    let mut receivers = Vec::with_capacity(args.tokens.len());
    for token in &args.tokens {
        let (tx, rx) = oneshot::channel::<AuthResult>();
        service.authenticate(
            Token::from(token.as_str()),
            None,
            Box::new(move |result: AuthResult| {
                let _ = tx.send(result);
            }),
        );
        receivers.push((token, rx));
    }

    let mut failures = 0usize;
    for (token, rx) in receivers {
        let outcome = rx.await?;
        match service.finish(outcome) {
            Ok(session) => println!("{token}: ok {session}"),
            Err(err) => {
                failures += 1;
                println!("{token}: {err}");
            }
        }
    }
    service.shutdown()?;

    if failures > 0 {
        return Err(format!("{failures} token(s) failed authentication").into());
    }
    Ok(())
}
