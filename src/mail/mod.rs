//! Transactional email via the Mailjet HTTP API.
//!
//! Delivery is fire-and-forget from the caller's perspective: the auth flows
//! log failures and carry on. No retries.

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::MailConfig;

fn welcome_body(username: &str, password: &str) -> String {
    format!(
        "<p>Hola {username}, gracias por registrarte en nuestra plataforma.<br>\
         Estas son tus credenciales:<br>\
         <strong>Usuario:</strong> {username}<br>\
         <strong>Contraseña:</strong> {password}<br>\
         ¡Disfruta de nuestros productos!</p>"
    )
}

fn reset_body(reset_link: &str) -> String {
    format!(
        "<p>Haz clic en el siguiente enlace para restablecer tu contraseña:</p>\
         <a href=\"{reset_link}\">Restablecer Contraseña</a>"
    )
}

/// HTTP client for the third-party mail API
pub struct Mailer {
    endpoint: String,
    api_key: String,
    api_secret: String,
    from_email: String,
    from_name: String,
    client: reqwest::Client,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Send one HTML email
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let payload = json!({
            "Messages": [{
                "From": { "Email": self.from_email, "Name": self.from_name },
                "To": [{ "Email": to, "Name": to }],
                "Subject": subject,
                "HTMLPart": html
            }]
        });

        self.client
            .post(&self.endpoint)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&payload)
            .send()
            .await
            .context("Failed to reach mail API")?
            .error_for_status()
            .context("Mail API rejected the message")?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }

    /// Welcome email echoing the submitted credentials
    pub async fn send_welcome(&self, to: &str, username: &str, password: &str) -> Result<()> {
        self.send(
            to,
            "Bienvenido a nuestra plataforma de pedidos",
            &welcome_body(username, password),
        )
        .await
    }

    /// Password-reset email carrying the frontend reset link
    pub async fn send_password_reset(&self, to: &str, reset_link: &str) -> Result<()> {
        self.send(
            to,
            "Restablecimiento de Contraseña",
            &reset_body(reset_link),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_body_carries_credentials() {
        let body = welcome_body("ruta12", "clave-segura");
        assert!(body.contains("ruta12"));
        assert!(body.contains("clave-segura"));
    }

    #[test]
    fn test_reset_body_carries_link() {
        let link = "http://localhost:5173/reset-password?token=abc";
        assert!(reset_body(link).contains(link));
    }
}
