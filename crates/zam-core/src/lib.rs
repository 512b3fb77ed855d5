pub mod diff;
pub mod division;
pub mod error;
pub mod event;
pub mod model;
pub mod sort_key;

pub use division::{AvantApres, DivisionType, SubDiv, parse_avant_apres, parse_range, parse_subdiv};
pub use error::ParseError;
pub use event::{Event, EventKind, Level, Payload, Subject};
pub use model::{
    Amendement, Article, ArticleUserContent, Chambre, Lecture, Location, MissionRef, Texte,
    TypeTexte, User, UserContent, is_irrecevable,
};
pub use sort_key::normalize_subdiv;
