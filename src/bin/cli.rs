use clap::{App, Arg, SubCommand};
use framelink::{
    compression::{lacing, registry},
    Result,
};

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("framelink-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Framelink buffer transport inspection tool")
        .subcommand(
            SubCommand::with_name("codecs")
                .about("Codec metadata registry")
                .subcommand(SubCommand::with_name("list").about("List all registered codecs"))
                .subcommand(
                    SubCommand::with_name("info")
                        .about("Show one codec's registry entry")
                        .arg(
                            Arg::with_name("name")
                                .value_name("SHORT_NAME")
                                .help("Short codec name, e.g. h264")
                                .required(true),
                        ),
                ),
        )
        .subcommand(
            SubCommand::with_name("lacing")
                .about("Inspect a laced header blob")
                .arg(
                    Arg::with_name("file")
                        .value_name("FILE")
                        .help("File containing a laced header")
                        .required(true),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("codecs", Some(sub)) => match sub.subcommand() {
            ("info", Some(info_matches)) => {
                let name = info_matches.value_of("name").unwrap();
                match registry::from_short_name(name) {
                    Some(id) => print_codec(registry::descriptor(id).unwrap()),
                    None => println!("unknown codec: {}", name),
                }
            }
            _ => {
                for desc in registry::all() {
                    println!(
                        "{:<8} {:<16} ext: {:<6} mime: {}",
                        desc.short_name,
                        desc.long_name,
                        desc.extension.unwrap_or("-"),
                        desc.mimetype.unwrap_or("-")
                    );
                }
            }
        },
        ("lacing", Some(sub)) => {
            let path = sub.value_of("file").unwrap();
            let data = std::fs::read(path)?;
            let segments = lacing::decode(&data)?;
            println!("{} segments, {} bytes total", segments.len(), data.len());
            for (i, segment) in segments.iter().enumerate() {
                println!("  segment {}: {} bytes", i, segment.len());
            }
        }
        _ => {
            println!("no subcommand given, try --help");
        }
    }

    Ok(())
}

fn print_codec(desc: &framelink::compression::CodecDescriptor) {
    println!("id:            {:?}", desc.id);
    println!("short name:    {}", desc.short_name);
    println!("long name:     {}", desc.long_name);
    println!("extension:     {}", desc.extension.unwrap_or("-"));
    println!("mimetype:      {}", desc.mimetype.unwrap_or("-"));
    println!("separate:      {}", registry::is_separate(desc.id));
    println!("needs pixfmt:  {}", registry::needs_pixelformat(desc.id));
    println!("const samples: {}", registry::constant_frame_samples(desc.id));
}
