pub mod anim;
pub mod collectible;
pub mod entity;
pub mod grid;
pub mod iso;
pub mod rules;
pub mod tile;
