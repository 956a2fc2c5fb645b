//! Mail bodies for the verification and reset flows.

/// A rendered mail ready for the sender.
#[derive(Debug, Clone)]
pub struct MailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn email_verification(link: &str) -> MailContent {
    MailContent {
        subject: "Verify your email".to_string(),
        html: format!(
            "Hi Userlanders,<br/>\
             <br/>\
             Please verify your Email by clicking <a href=\"{}\">here</a><br/>\
             <br/>\
             Cheers,<br/>\
             Your Userland Team",
            link
        ),
        text: "Hi Userlanders, please verify your email".to_string(),
    }
}

pub fn password_reset(token: &str) -> MailContent {
    MailContent {
        subject: "Reset Password".to_string(),
        html: format!(
            "Hi Userlanders,<br/>\
             <br/>\
             Here is your token to reset your password:\
             <p style=\"font-size: 18px; font-weight: 600;\">{}</p><br/>\
             <br/>\
             If you don't request a password reset, please ignore this email.<br/>\
             <br/>\
             Cheers,<br/>\
             Your Userland Team",
            token
        ),
        text: "Hi Userlanders, use this token to reset your password".to_string(),
    }
}

pub fn email_change_verification(link: &str) -> MailContent {
    MailContent {
        subject: "Verify your new email".to_string(),
        html: format!(
            "Hi Userlanders,<br/>\
             <br/>\
             Please confirm your new Email by clicking <a href=\"{}\">here</a><br/>\
             <br/>\
             Cheers,<br/>\
             Your Userland Team",
            link
        ),
        text: "Hi Userlanders, please confirm your new email".to_string(),
    }
}
