//! Narrow contracts the dispatcher calls out to, with small reference
//! implementations.

mod body;
mod files;
mod session;
mod views;

pub use body::{BodyParser, FormParser};
pub use files::{DirectoryFiles, StaticFiles};
pub use session::{Login, MemorySessions, RedirectLogin, SessionLoader, SESSION_USER_HEADER};
pub use views::{StaticViewMap, StaticViews, TemplateId};

pub type BodyParserService = Box<dyn BodyParser + Send + Sync + 'static>;
pub type SessionLoaderService = Box<dyn SessionLoader + Send + Sync + 'static>;
pub type LoginService = Box<dyn Login + Send + Sync + 'static>;
pub type StaticViewsService = Box<dyn StaticViews + Send + Sync + 'static>;
pub type StaticFilesService = Box<dyn StaticFiles + Send + Sync + 'static>;
