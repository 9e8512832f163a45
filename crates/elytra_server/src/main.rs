// SPDX-License-Identifier: MIT

//! `elytrad`: the Elytra control plane binary.

#[tokio::main]
async fn main() {
    std::process::exit(elytra_server::run().await);
}
