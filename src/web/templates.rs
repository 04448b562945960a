use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub count: usize,
    pub fit_active: bool,
    pub power_supported: bool,
}
