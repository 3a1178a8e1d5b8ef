pub mod attacker_book;
pub mod id_generator;
