use crate::error::DexcomError;
use crate::models::oauth::{CallbackParams, OAuthRequest};
use crate::models::readings::{LoadedReadings, RangeQuery};
use crate::models::session::{Notice, SessionContext, SessionPhase};
use crate::services::{OAuthClient, ReadingsFetcher};
use reqwest::Url;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum SessionAction {
    Connect,
    Callback(CallbackParams),
    LoadData(RangeQuery),
    RefreshToken,
    Disconnect,
}

/// Result of one action: the phase entered, what to tell the user, and the
/// authorization URL whenever the session is not authenticated.
#[derive(Debug)]
pub struct Transition {
    pub phase: SessionPhase,
    pub notices: Vec<Notice>,
    pub authorization_url: Option<Url>,
}

impl Transition {
    fn to(phase: SessionPhase) -> Self {
        Self {
            phase,
            notices: Vec::new(),
            authorization_url: None,
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

/// A callback whose state matched the outstanding request.
#[derive(Debug)]
pub struct VerifiedCallback {
    code: String,
    state: String,
    issued: OAuthRequest,
}

#[derive(Debug)]
pub enum CallbackDecision {
    Exchange(VerifiedCallback),
    Done(Transition),
}

/// Drives one session through connect, callback, load, refresh and
/// disconnect. Every method takes the session context explicitly; the
/// controller itself holds no state.
pub struct SessionController<'a> {
    oauth: &'a OAuthClient,
    fetcher: &'a ReadingsFetcher,
}

impl<'a> SessionController<'a> {
    pub fn new(oauth: &'a OAuthClient, fetcher: &'a ReadingsFetcher) -> Self {
        Self { oauth, fetcher }
    }

    pub async fn dispatch(&self, ctx: &mut SessionContext, action: SessionAction) -> Transition {
        match action {
            SessionAction::Connect => self.connect(ctx),
            SessionAction::Callback(params) => match self.accept_callback(ctx, params) {
                CallbackDecision::Done(transition) => transition,
                CallbackDecision::Exchange(verified) => self.complete_callback(ctx, verified).await,
            },
            SessionAction::LoadData(range) => self.load_data(ctx, range).await,
            SessionAction::RefreshToken => self.refresh_token(ctx).await,
            SessionAction::Disconnect => self.disconnect(ctx),
        }
    }

    /// Emits the authorization URL, issuing a state only if none is active.
    pub fn connect(&self, ctx: &mut SessionContext) -> Transition {
        if ctx.token.is_some() {
            return Transition::to(SessionPhase::Authenticated);
        }

        let request = ctx.pending.get_or_insert_with(|| {
            debug!("issuing oauth state");
            OAuthRequest::issue()
        });

        Transition {
            authorization_url: Some(self.oauth.authorization_url(request)),
            ..Transition::to(SessionPhase::Unauthenticated)
        }
    }

    /// First half of callback handling. Performs no I/O; the pending state is
    /// consumed here whatever the outcome, so the caller should persist the
    /// context before running the exchange.
    pub fn accept_callback(
        &self,
        ctx: &mut SessionContext,
        params: CallbackParams,
    ) -> CallbackDecision {
        if ctx.token.is_some() {
            info!("ignoring callback for an authenticated session");
            return CallbackDecision::Done(Transition::to(SessionPhase::Authenticated));
        }

        let issued = ctx.pending.take();

        if let Some(error) = params.error {
            let detail = params.error_description.unwrap_or(error);
            warn!(error = %detail, "authorization was not granted");
            let notice = Notice::error(format!("Authorization was not granted: {detail}"));
            return CallbackDecision::Done(self.restart(ctx, notice));
        }

        let (Some(code), Some(state)) = (params.code, params.state) else {
            warn!("callback is missing its code or state");
            let notice = Notice::error(DexcomError::Security.to_string());
            return CallbackDecision::Done(self.restart(ctx, notice));
        };

        if let Err(err) = OAuthClient::verify_state(issued.as_ref(), &state) {
            return CallbackDecision::Done(self.restart(ctx, Notice::error(err.to_string())));
        }

        match issued {
            Some(issued) => CallbackDecision::Exchange(VerifiedCallback { code, state, issued }),
            None => {
                let notice = Notice::error(DexcomError::Security.to_string());
                CallbackDecision::Done(self.restart(ctx, notice))
            }
        }
    }

    pub async fn complete_callback(
        &self,
        ctx: &mut SessionContext,
        verified: VerifiedCallback,
    ) -> Transition {
        let exchanged = self
            .oauth
            .exchange_code(&verified.code, &verified.state, Some(&verified.issued))
            .await;

        match exchanged {
            Ok(token) => {
                ctx.token = Some(token);
                ctx.pending = None;
                Transition::to(SessionPhase::Authenticated)
                    .with_notice(Notice::success("Successfully connected to Dexcom!"))
            }
            Err(err) => {
                warn!(kind = err.kind(), "authorization code exchange failed");
                self.restart(ctx, Notice::error(err.to_string()))
            }
        }
    }

    async fn load_data(&self, ctx: &mut SessionContext, range: RangeQuery) -> Transition {
        let (access_token, expires_soon) = match ctx.token.as_ref() {
            Some(token) => (
                token.access_token.secret().clone(),
                token.expires_soon(OffsetDateTime::now_utc()),
            ),
            None => return self.not_connected(ctx),
        };

        let mut transition = Transition::to(SessionPhase::Authenticated);
        if expires_soon {
            transition.notices.push(Notice::warning(
                "Your access token will expire soon. Consider refreshing it.",
            ));
        }

        match self.fetcher.fetch_readings(&access_token, &range).await {
            Ok(readings) => {
                transition.notices.push(if readings.is_empty() {
                    Notice::warning("No glucose readings found for the selected period")
                } else {
                    Notice::success(format!("Loaded {} glucose readings", readings.len()))
                });
                ctx.last_load = Some(LoadedReadings { range, readings });
            }
            Err(err) => {
                // previously loaded readings stay on screen
                warn!(kind = err.kind(), "loading glucose data failed");
                transition.notices.push(Notice::error(err.to_string()));
            }
        }

        transition
    }

    async fn refresh_token(&self, ctx: &mut SessionContext) -> Transition {
        let refresh_token = match ctx.token.as_ref() {
            Some(token) => token.refresh_token.clone(),
            None => return self.not_connected(ctx),
        };

        debug!(phase = ?SessionPhase::Refreshing, "refreshing access token");
        match self.oauth.refresh(&refresh_token).await {
            Ok(token) => {
                ctx.token = Some(token);
                Transition::to(SessionPhase::Authenticated)
                    .with_notice(Notice::success("Token refreshed successfully!"))
            }
            Err(err) if err.is_transient() => {
                warn!(kind = err.kind(), "token refresh failed, keeping current token");
                Transition::to(SessionPhase::Authenticated)
                    .with_notice(Notice::error(err.to_string()))
            }
            Err(err) => {
                warn!(kind = err.kind(), "token refresh rejected, discarding token");
                ctx.token = None;
                self.restart(ctx, Notice::error(err.to_string()))
            }
        }
    }

    fn disconnect(&self, ctx: &mut SessionContext) -> Transition {
        *ctx = SessionContext::default();
        info!("disconnected from Dexcom");
        Transition::to(SessionPhase::Disconnected)
            .with_notice(Notice::info("Disconnected from Dexcom"))
    }

    fn not_connected(&self, ctx: &mut SessionContext) -> Transition {
        self.connect(ctx)
            .with_notice(Notice::error(DexcomError::NotConnected.to_string()))
    }

    /// Back to `Unauthenticated`, with a fresh authorization URL.
    fn restart(&self, ctx: &mut SessionContext, notice: Notice) -> Transition {
        ctx.token = None;
        self.connect(ctx).with_notice(notice)
    }
}
