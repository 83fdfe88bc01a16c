// UI module - egui front end

pub mod app;
