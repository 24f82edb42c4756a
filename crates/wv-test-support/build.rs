// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiles the same `weaviate.proto` as `wv-transport`, but with server
//! codegen enabled (`wv-transport`'s `build.rs` disables it — a client
//! library has no business shipping server stubs). The two crates get
//! distinct generated Rust types; that's fine, since only the wire format
//! needs to match and both sides compile from the same `.proto` file.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_client(false)
        .build_server(true)
        .compile_protos(
            &["../wv-transport/proto/weaviate.proto"],
            &["../wv-transport/proto"],
        )?;
    Ok(())
}
