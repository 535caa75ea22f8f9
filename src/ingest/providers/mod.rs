pub mod channel;
pub mod xml_feed;
pub mod ytdlp;
