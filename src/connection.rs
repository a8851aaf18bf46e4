//! Session-carrying gateway connection
//!
//! The gateway is stateless HTTP, so transaction correctness on the sharded
//! backend hinges on the opaque session token: every response may carry
//! one, and the connection replays the latest token on its next request so
//! sequential statements land on the same backend. `execute` takes
//! `&mut self` for exactly this reason: the exclusive borrow makes the
//! send-then-update ordering visible in the signature and rules out two
//! racing executes on one connection. Callers needing parallelism use one
//! connection per in-flight operation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;

use crate::cast::{self, CastFn};
use crate::config::Config;
use crate::decode::decode_rows;
use crate::error::{DatabaseError, DriverResult, ErrorBody};
use crate::sanitize::{format, Params};
use crate::transport::{HttpTransport, ReqwestTransport, TransportResponse};
use crate::types::{ExecutedQuery, RowMode, TypeTag};
use crate::wire::{ExecuteRequest, QueryExecuteResponse, Session};

pub(crate) const EXECUTE_PATH: &str = "/psdb.v1alpha1.Database/Execute";
pub(crate) const CREATE_SESSION_PATH: &str = "/psdb.v1alpha1.Database/CreateSession";

/// Client identifier sent with every request.
const USER_AGENT: &str = concat!("sqlgate/", env!("CARGO_PKG_VERSION"));

/// Per-call execution options.
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Row shape: name→value objects (default) or positional arrays
    pub rows: RowMode,
    /// Caster replacing the default dispatch for this call only; wins over
    /// a connection-level caster
    pub cast: Option<CastFn>,
}

impl ExecuteOptions {
    pub fn array_rows() -> Self {
        Self {
            rows: RowMode::Array,
            ..Self::default()
        }
    }

    pub fn with_cast(mut self, cast: CastFn) -> Self {
        self.cast = Some(cast);
        self
    }
}

/// A logical connection to the gateway.
///
/// Holds the credentials, the injected transport, and the current session
/// token (`None` until the first response carries one).
pub struct Connection {
    config: Config,
    transport: Arc<dyn HttpTransport>,
    session: Option<Session>,
    cast: Option<CastFn>,
}

impl Connection {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    /// Builds a connection over an injected transport.
    pub fn with_transport(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            session: None,
            cast: None,
        }
    }

    /// Installs a connection-level caster applied to every execute call
    /// that does not supply its own.
    pub fn with_cast(mut self, cast: CastFn) -> Self {
        self.cast = Some(cast);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current session token, if any response has delivered one.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub(crate) fn sibling(&self) -> Connection {
        Self::with_transport(self.config.clone(), Arc::clone(&self.transport))
    }

    /// Establishes (or replaces) the session without executing anything.
    pub async fn refresh(&mut self) -> DriverResult<()> {
        let response = self
            .post_json(CREATE_SESSION_PATH, &serde_json::json!({}))
            .await?;
        if let Some(session) = response.session {
            self.session = Some(session);
        }
        tracing::debug!("session refreshed");
        Ok(())
    }

    /// Executes a statement with object-shaped rows and the default caster.
    pub async fn execute(
        &mut self,
        query: &str,
        params: impl Into<Params>,
    ) -> DriverResult<ExecutedQuery> {
        self.execute_with(query, params, ExecuteOptions::default()).await
    }

    /// Executes a statement.
    ///
    /// Parameters are rendered into a literal SQL string before the request
    /// leaves the process; `Params::None` sends the template untouched. A
    /// response carrying an `error` fails the call with no row data, and a
    /// response carrying a `session` replaces the stored token (absence
    /// never clears it).
    pub async fn execute_with(
        &mut self,
        query: &str,
        params: impl Into<Params>,
        options: ExecuteOptions,
    ) -> DriverResult<ExecutedQuery> {
        let started = Instant::now();
        let statement = format(query, &params.into());

        let request = ExecuteRequest {
            query: &statement,
            session: self.session.as_ref(),
        };
        let response = self.post_json(EXECUTE_PATH, &request).await?;

        if let Some(error) = response.error {
            return Err(DatabaseError::server(error.message.clone(), 400, error));
        }
        if let Some(session) = response.session {
            self.session = Some(session);
        }

        let result = response.result.unwrap_or_default();
        let fields = result.fields.unwrap_or_default();
        let wire_rows = result.rows.unwrap_or_default();

        let rows = match options.cast.as_ref().or(self.cast.as_ref()) {
            Some(custom) => decode_rows(&fields, &wire_rows, options.rows, custom.as_ref())?,
            None => decode_rows(&fields, &wire_rows, options.rows, &cast::cast)?,
        };

        let headers: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        let types: HashMap<String, TypeTag> =
            fields.iter().map(|f| (f.name.clone(), f.ty)).collect();

        let rows_affected = match &result.rows_affected {
            Some(count) => count.parse::<u64>().map_err(|e| {
                DatabaseError::decode(format!("invalid rowsAffected `{count}`: {e}"))
            })?,
            None => 0,
        };
        let insert_id = result.insert_id.unwrap_or_else(|| "0".to_string());

        // Server-reported elapsed seconds win over the client-side clock.
        let time = match response.timing {
            Some(seconds) => seconds * 1000.0,
            None => started.elapsed().as_secs_f64() * 1000.0,
        };

        let size = rows.len();
        tracing::debug!(
            rows = size,
            rows_affected,
            time_ms = time,
            "executed statement"
        );

        Ok(ExecutedQuery {
            headers,
            types,
            fields,
            rows,
            rows_affected,
            insert_id,
            size,
            statement,
            time,
        })
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> DriverResult<QueryExecuteResponse> {
        let url = self.config.endpoint(path);
        let payload = serde_json::to_string(body)
            .map_err(|e| DatabaseError::decode(format!("failed to encode request: {e}")))?;

        let auth = STANDARD.encode(format!("{}:{}", self.config.username, self.config.password));
        let headers = [
            ("Content-Type", "application/json".to_string()),
            ("Authorization", format!("Basic {auth}")),
            ("User-Agent", USER_AGENT.to_string()),
        ];

        let response = self.transport.post(&url, &headers, payload).await?;
        if !response.is_success() {
            return Err(error_from_response(&response));
        }

        serde_json::from_str(&response.body)
            .map_err(|e| DatabaseError::decode(format!("invalid gateway response: {e}")))
    }
}

/// Maps a non-2xx response to a server error: the parsed error payload when
/// the body is JSON, else a body synthesized from the status line.
fn error_from_response(response: &TransportResponse) -> DatabaseError {
    if let Ok(QueryExecuteResponse { error: Some(body), .. }) =
        serde_json::from_str::<QueryExecuteResponse>(&response.body)
    {
        return DatabaseError::server(body.message.clone(), response.status, body);
    }
    if let Ok(body) = serde_json::from_str::<ErrorBody>(&response.body) {
        return DatabaseError::server(body.message.clone(), response.status, body);
    }
    let body = ErrorBody::internal(response.status_line());
    DatabaseError::server(body.message.clone(), response.status, body)
}

/// Connection factory sharing one config and transport.
///
/// `execute` runs on a throwaway connection; use [`Client::connection`]
/// when statements must share a session lineage.
pub struct Client {
    config: Config,
    transport: Arc<dyn HttpTransport>,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport: Arc::new(ReqwestTransport::default()),
        }
    }

    pub fn with_transport(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn connection(&self) -> Connection {
        Connection::with_transport(self.config.clone(), Arc::clone(&self.transport))
    }

    /// One-shot execute on a fresh connection.
    pub async fn execute(
        &self,
        query: &str,
        params: impl Into<Params>,
    ) -> DriverResult<ExecutedQuery> {
        self.connection().execute(query, params).await
    }
}
