//! CalDAV session: endpoint discovery and event CRUD.
//!
//! A [`CalDavSession`] owns the account [`Credentials`], a [`Transport`] and
//! the [`DiscoveryState`]. Discovery is two PROPFIND requests: the server
//! root yields the current user principal, the principal yields the
//! calendar home. Listing calendars needs the home URL; event operations
//! work on any URL the caller supplies.

use tracing::{debug, info, warn};

use davcal_core::{Calendar, CalendarEvent, Credentials, TimeRange};

use super::config::CalDavConfig;
use super::ics::generate_uid;
use super::transport::{DavRequest, DavResponse, HttpTransport, Transport};
use super::xml;
use crate::error::{CalDavError, CalDavResult};

/// Message carried by the error returned when calendar-home discovery has
/// not succeeded.
pub const NOT_INITIALIZED_MESSAGE: &str =
    "calendar home URL not discovered; run initialize() against a reachable server first";

/// How far endpoint discovery has progressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DiscoveryState {
    /// Nothing discovered yet, or the last attempt failed at the first step.
    #[default]
    Uninitialized,
    /// The principal is known but the calendar home is not.
    PrincipalDiscovered { principal_url: String },
    /// Both endpoints are known; calendars can be listed.
    Ready {
        principal_url: String,
        calendar_home_url: String,
    },
}

impl DiscoveryState {
    /// Returns true once the calendar home is known.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns the principal URL, if discovered.
    pub fn principal_url(&self) -> Option<&str> {
        match self {
            Self::Uninitialized => None,
            Self::PrincipalDiscovered { principal_url } | Self::Ready { principal_url, .. } => {
                Some(principal_url)
            }
        }
    }

    /// Returns the calendar home URL, if discovered.
    pub fn calendar_home_url(&self) -> Option<&str> {
        match self {
            Self::Ready {
                calendar_home_url, ..
            } => Some(calendar_home_url),
            _ => None,
        }
    }
}

/// A connection to one CalDAV account.
///
/// Discovery mutates the session and therefore takes `&mut self`; all other
/// operations only read it.
#[derive(Debug)]
pub struct CalDavSession<T> {
    credentials: Credentials,
    transport: T,
    state: DiscoveryState,
}

impl CalDavSession<HttpTransport> {
    /// Creates a session that talks HTTP using the given configuration.
    pub fn connect(config: CalDavConfig) -> CalDavResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config.credentials, transport))
    }
}

impl<T: Transport> CalDavSession<T> {
    /// Creates an uninitialized session over an existing transport.
    pub fn new(credentials: Credentials, transport: T) -> Self {
        Self {
            credentials,
            transport,
            state: DiscoveryState::Uninitialized,
        }
    }

    /// Returns the discovery state.
    pub fn state(&self) -> &DiscoveryState {
        &self.state
    }

    /// Returns the discovered principal URL.
    pub fn principal_url(&self) -> Option<&str> {
        self.state.principal_url()
    }

    /// Returns the discovered calendar home URL.
    pub fn calendar_home_url(&self) -> Option<&str> {
        self.state.calendar_home_url()
    }

    /// Returns the account this session uses.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Checks that the server root answers an OPTIONS request with 2xx.
    ///
    /// Transport failures are logged and reported as `false`.
    pub async fn test_connection(&self) -> bool {
        let url = self.credentials.server_url().to_string();
        match self.transport.send(DavRequest::options(url.as_str())).await {
            Ok(response) => {
                if !response.is_success() {
                    warn!(status = response.status, url = %url, "Connection test got non-success status");
                }
                response.is_success()
            }
            Err(e) => {
                warn!(error = %e, url = %url, "Connection test failed");
                false
            }
        }
    }

    /// Runs both discovery steps and returns whether the session is ready.
    ///
    /// Every call starts from scratch. Failures of any kind are logged and
    /// reported as `false`; the state then shows how far discovery got.
    pub async fn initialize(&mut self) -> bool {
        self.state = DiscoveryState::Uninitialized;

        let principal_url = match self.discover_principal().await {
            Ok(Some(url)) => url,
            Ok(None) => {
                warn!("Current user principal not found");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Principal discovery failed");
                return false;
            }
        };
        info!(principal = %principal_url, "Discovered current user principal");
        self.state = DiscoveryState::PrincipalDiscovered {
            principal_url: principal_url.clone(),
        };

        let calendar_home_url = match self.discover_calendar_home(&principal_url).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                warn!(principal = %principal_url, "Calendar home set not found");
                return false;
            }
            Err(e) => {
                warn!(error = %e, principal = %principal_url, "Calendar home discovery failed");
                return false;
            }
        };
        info!(home = %calendar_home_url, "Discovered calendar home");
        self.state = DiscoveryState::Ready {
            principal_url,
            calendar_home_url,
        };
        true
    }

    /// Lists the calendars in the calendar home.
    ///
    /// Runs [`initialize`](Self::initialize) once if discovery has not
    /// succeeded yet.
    ///
    /// # Errors
    ///
    /// Returns a [`NotInitialized`](crate::error::CalDavErrorCode::NotInitialized)
    /// error if the calendar home still cannot be discovered, an
    /// [`HttpStatus`](crate::error::CalDavErrorCode::HttpStatus) error for a
    /// non-success PROPFIND and transport or XML errors otherwise.
    pub async fn get_calendars(&mut self) -> CalDavResult<Vec<Calendar>> {
        if !self.state.is_ready() {
            debug!("Calendar home unknown, running discovery");
            self.initialize().await;
        }

        let home = self
            .state
            .calendar_home_url()
            .ok_or_else(|| CalDavError::not_initialized(NOT_INITIALIZED_MESSAGE))?
            .to_string();

        let request = DavRequest::propfind(home.as_str(), 1, xml::propfind_calendars_body());
        let response = self.send_checked(request).await?;
        let calendars = xml::parse_calendar_list(&response.body)?;

        info!(count = calendars.len(), home = %home, "Listed calendars");
        Ok(calendars)
    }

    /// Fetches the events of a calendar within a time range.
    ///
    /// `calendar_url` may be absolute or relative to the server URL.
    pub async fn get_events(
        &self,
        calendar_url: &str,
        range: &TimeRange,
    ) -> CalDavResult<Vec<CalendarEvent>> {
        let url = self.resolve(calendar_url)?;
        let request = DavRequest::report(url.as_str(), 1, xml::calendar_query_body(range));
        let response = self.send_checked(request).await?;
        let events = xml::parse_calendar_events(&response.body)?;

        info!(count = events.len(), calendar = %url, "Fetched events");
        Ok(events)
    }

    /// Uploads a new event and returns its URL.
    ///
    /// The resource is named `<uid>.ics` under `calendar_url`; a UID is
    /// generated when none is given. `If-None-Match: *` makes the server
    /// refuse to overwrite an existing resource.
    pub async fn create_event(
        &self,
        calendar_url: &str,
        icalendar: &str,
        uid: Option<&str>,
    ) -> CalDavResult<String> {
        let uid = match uid {
            Some(uid) if !uid.is_empty() => uid.to_string(),
            _ => generate_uid(),
        };
        let event_url = format!("{}/{}.ics", calendar_url.trim_end_matches('/'), uid);

        let request = DavRequest::put(self.resolve(&event_url)?, icalendar).header("If-None-Match", "*");
        self.send_checked(request).await?;

        info!(url = %event_url, "Created event");
        Ok(event_url)
    }

    /// Replaces an event, optionally guarded by its ETag.
    pub async fn update_event(
        &self,
        event_url: &str,
        icalendar: &str,
        etag: Option<&str>,
    ) -> CalDavResult<()> {
        let request = with_if_match(DavRequest::put(self.resolve(event_url)?, icalendar), etag);
        self.send_checked(request).await?;

        info!(url = %event_url, "Updated event");
        Ok(())
    }

    /// Deletes an event, optionally guarded by its ETag.
    pub async fn delete_event(&self, event_url: &str, etag: Option<&str>) -> CalDavResult<()> {
        let request = with_if_match(DavRequest::delete(self.resolve(event_url)?), etag);
        self.send_checked(request).await?;

        info!(url = %event_url, "Deleted event");
        Ok(())
    }

    async fn discover_principal(&self) -> CalDavResult<Option<String>> {
        let request = DavRequest::propfind(
            self.credentials.server_url().as_str(),
            0,
            xml::current_user_principal_body(),
        );
        self.discover_href(request, xml::CURRENT_USER_PRINCIPAL_HREF).await
    }

    async fn discover_calendar_home(&self, principal_url: &str) -> CalDavResult<Option<String>> {
        let request = DavRequest::propfind(principal_url, 0, xml::calendar_home_body());
        self.discover_href(request, xml::CALENDAR_HOME_SET_HREF).await
    }

    /// Sends a discovery PROPFIND and resolves the href found at `path`.
    ///
    /// A non-success status or a missing href yields `Ok(None)`.
    async fn discover_href(&self, request: DavRequest, path: &str) -> CalDavResult<Option<String>> {
        let url = request.url.clone();
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!(status = response.status, url = %url, "Discovery PROPFIND rejected");
            return Ok(None);
        }

        let href = xml::extract_href(&response.body, path)?;
        if href.is_empty() {
            return Ok(None);
        }
        self.resolve(&href).map(Some)
    }

    /// Sends a request and turns non-success statuses into errors.
    async fn send_checked(&self, request: DavRequest) -> CalDavResult<DavResponse> {
        let method = request.method;
        let url = request.url.clone();
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(CalDavError::http_status(
                response.status,
                format!("{} {} returned status {}", method, url, response.status),
            ));
        }
        Ok(response)
    }

    /// Resolves an href against the server URL.
    ///
    /// Values starting with `http` are taken verbatim.
    fn resolve(&self, href: &str) -> CalDavResult<String> {
        if href.starts_with("http") {
            return Ok(href.to_string());
        }
        Ok(self.credentials.server_url().join(href)?.to_string())
    }
}

/// Adds `If-Match: "<etag>"` when an ETag is present. Empty means absent.
fn with_if_match(request: DavRequest, etag: Option<&str>) -> DavRequest {
    match etag {
        Some(etag) if !etag.is_empty() => request.header("If-Match", format!("\"{}\"", etag)),
        _ => request,
    }
}
