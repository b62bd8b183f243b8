pub mod keywords;
pub mod normalize;

pub use keywords::{rank_phrases, top_phrases, RankedPhrase};
pub use normalize::{clean_text, is_stopword};
