/// Account emails
///
/// Both messages carry the 6-digit code and link to the web client page where
/// it is entered. The plain-text part repeats the code on its own
/// `Código: NNNNNN` line.

use super::OutboundEmail;
use crate::models::token::TOKEN_TTL_MINUTES;

/// Account confirmation message sent after registration
pub fn confirmation_email(frontend_url: &str, to: &str, name: &str, code: &str) -> OutboundEmail {
    let link = format!("{}/auth/confirm-account", frontend_url.trim_end_matches('/'));
    let name = escape_html(name);

    OutboundEmail {
        to: to.to_string(),
        subject: "UpTask - Confirmación de cuenta".to_string(),
        text: format!(
            "Confirmación de cuenta\n\n\
             Para confirmar tu cuenta visita {link}\n\
             Código: {code}\n\n\
             Este código expirará en {TOKEN_TTL_MINUTES} minutos.\n"
        ),
        html: format!(
            "<p>Hola {name}, bienvenido a UpTask</p>\
             <p>Para confirmar tu cuenta, haz click en el siguiente enlace: \
             <a href=\"{link}\">Confirmar cuenta</a></p>\
             <p>E ingresa el siguiente código: <b>{code}</b></p>\
             <p>Este código expirará en {TOKEN_TTL_MINUTES} minutos.</p>\
             <p>Si no solicitaste este cambio, puedes ignorar este correo.</p>\
             <p>Saludos,</p><p>UpTask</p>"
        ),
    }
}

/// Password reset message
pub fn password_reset_email(frontend_url: &str, to: &str, name: &str, code: &str) -> OutboundEmail {
    let link = format!("{}/auth/new-password", frontend_url.trim_end_matches('/'));
    let name = escape_html(name);

    OutboundEmail {
        to: to.to_string(),
        subject: "UpTask - Restablece tu contraseña".to_string(),
        text: format!(
            "Restablece tu contraseña\n\n\
             Para restablecer tu contraseña visita {link}\n\
             Código: {code}\n\n\
             Este código expirará en {TOKEN_TTL_MINUTES} minutos.\n"
        ),
        html: format!(
            "<p>Hola {name},</p>\
             <p>Para restablecer tu contraseña, haz click en el siguiente enlace: \
             <a href=\"{link}\">Restablecer contraseña</a></p>\
             <p>Ingresa el siguiente código: <b>{code}</b></p>\
             <p>Este código expirará en {TOKEN_TTL_MINUTES} minutos.</p>\
             <p>Si no solicitaste este cambio, puedes ignorar este correo.</p>\
             <p>Saludos,</p><p>UpTask</p>"
        ),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
