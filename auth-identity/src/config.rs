use serde::{Deserialize, Serialize};

/// Argon2id cost parameters shared by password and refresh-token hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    /// Number of passes (default: 2)
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Degree of parallelism (default: 1)
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl HashingConfig {
    /// Lowest cost Argon2 accepts. Only for tests and local tooling.
    pub fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_memory_kib() -> u32 {
    19_456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}
