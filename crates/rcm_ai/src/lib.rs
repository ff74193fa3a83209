pub mod audit;
pub mod compare;
pub mod corpus;
pub mod embeddings;
pub mod evidence;
pub mod http;
pub mod hyde;
pub mod index;
pub mod invoker;
pub mod llm;
pub mod provider;
pub mod retrieve;
pub mod summary;

