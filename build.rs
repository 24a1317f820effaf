fn main() -> std::io::Result<()> {
	let protos = ["protobuf/Schema.proto"];

	prost_build::Config::new().compile_protos(&protos, &["protobuf/"])?;

	for proto in protos {
		println!("cargo:rerun-if-changed={}", proto);
	}

	Ok(())
}
