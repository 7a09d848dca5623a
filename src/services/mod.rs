pub mod message_service;
