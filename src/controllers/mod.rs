pub mod simulation_controller;
