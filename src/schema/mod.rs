pub mod case;
pub mod history;
pub mod scenario;
pub mod scene;
