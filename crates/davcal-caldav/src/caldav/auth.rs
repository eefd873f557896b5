//! HTTP Basic authentication (RFC 7617).

use base64::Engine;

use davcal_core::Credentials;

/// Generates a Basic authentication header value.
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    format!("Basic {}", encoded)
}

/// Builds the `Authorization` value for an account.
pub fn authorization_for(credentials: &Credentials) -> String {
    basic_auth(credentials.username(), credentials.password())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_encoding() {
        let header = basic_auth("user", "password");
        // base64("user:password") = "dXNlcjpwYXNzd29yZA=="
        assert_eq!(header, "Basic dXNlcjpwYXNzd29yZA==");
    }

    #[test]
    fn colon_in_password_is_kept() {
        // base64("u:p:w") = "dTpwOnc="
        assert_eq!(basic_auth("u", "p:w"), "Basic dTpwOnc=");
    }

    #[test]
    fn from_credentials() {
        let creds = Credentials::new("https://caldav.example.com/", "testuser", "testpass").unwrap();
        // base64("testuser:testpass") = "dGVzdHVzZXI6dGVzdHBhc3M="
        assert_eq!(authorization_for(&creds), "Basic dGVzdHVzZXI6dGVzdHBhc3M=");
    }
}
