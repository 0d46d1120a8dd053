use axum::response::Html;
use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::AppError;
use crate::session::Session;

// https://handlebarsjs.com/guide/partials.html#partial-blocks

const TEMPLATES: [(&str, &str); 6] = [
    ("layout", include_str!("../templates/layout.hbs")),
    ("wizard", include_str!("../templates/wizard.hbs")),
    ("login", include_str!("../templates/login.hbs")),
    ("admin", include_str!("../templates/admin.hbs")),
    ("record-form", include_str!("../templates/record-form.hbs")),
    ("confirm-delete", include_str!("../templates/confirm-delete.hbs")),
];

pub static HANDLEBARS: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut handlebars = Handlebars::new();
    for (name, source) in TEMPLATES {
        handlebars
            .register_template_string(name, source)
            .expect("embedded templates are valid");
    }
    handlebars
});

#[derive(Serialize)]
pub struct TemplateWrapper<'a, T> {
    pub email: Option<&'a str>,
    #[serde(flatten)]
    pub inner: T,
}

pub fn render<T: Serialize>(
    session: &Session,
    template_name: &str,
    value: T,
) -> Result<Html<String>, AppError> {
    Ok(Html(HANDLEBARS.render(
        template_name,
        &TemplateWrapper {
            email: session.email(),
            inner: value,
        },
    )?))
}
