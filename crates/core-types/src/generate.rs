use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Camila", "Diego", "Eduarda", "Felipe", "Gabriela", "Heitor", "Isabela",
    "João", "Larissa", "Lucas", "Mariana", "Nicolas", "Olivia", "Pedro", "Rafaela", "Samuel",
    "Tatiane", "Vinicius",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Barbosa", "Cardoso", "Costa", "Ferreira", "Gomes", "Lima", "Martins",
    "Oliveira", "Pereira", "Ribeiro", "Rocha", "Santos", "Silva", "Souza",
];

/// Length of a generated profile access credential.
pub const CREDENTIAL_LEN: usize = 10;

/// Builds a plausible full name for a new profile.
pub fn fictitious_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ana");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Silva");
    format!("{first} {last}")
}

/// A random alphanumeric access credential.
pub fn credential<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(CREDENTIAL_LEN)
        .map(char::from)
        .collect()
}
