use askama::Template;

#[derive(Template)]
#[template(path = "emails/welcome.txt")]
pub struct WelcomeEmail<'a> {
    pub project_name: &'a str,
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
}

#[derive(Template)]
#[template(path = "emails/forgot-password.txt")]
pub struct ForgotPasswordEmail<'a> {
    pub project_name: &'a str,
    pub key: &'a str,
}

#[derive(Template)]
#[template(path = "emails/contact.txt")]
pub struct ContactEmail<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub message: &'a str,
}
