// Services module - issuing client and orchestration logic

pub mod issuing;
pub mod registrar;
