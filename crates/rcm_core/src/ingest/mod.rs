pub mod expert_csv;
pub mod rcm_csv;
pub mod text;
