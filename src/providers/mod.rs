pub mod news_api;
pub mod openai;
pub mod yahoo_finance;
