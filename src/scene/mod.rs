pub mod level;
pub mod prefabs;
pub mod test_scene;
