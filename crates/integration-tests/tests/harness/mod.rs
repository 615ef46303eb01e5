#![allow(dead_code)]

pub mod home;
pub mod mock_elevenlabs;
pub mod mock_google;
