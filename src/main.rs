use clap::{arg,crate_version,Command};
use std::io::Read;
use squeezer::{checksum,png,stream,BlockType,Format};
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            return true;
        }
        return false;
    }
    true
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `squeezer compress -f gzip -i my_file -o my_file.gz`
Optimize PNG:  `squeezer png -i image.png -o smaller.png`
Checksum:      `squeezer checksum -a crc32 -i my_file`";

    let formats = ["gzip","zlib","deflate"];
    let block_types = ["dynamic","fixed","stored"];
    let algorithms = ["crc32","adler32"];

    let mut main_cmd = Command::new("squeezer")
        .about("Streaming gzip, zlib and deflate compression")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-f --format <FORMAT> "container format").value_parser(formats)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-n --iterations <COUNT> "optimizer iterations").value_parser(clap::value_parser!(u32))
            .required(false))
        .arg(arg!(-b --block <TYPE> "deflate block type").value_parser(block_types)
            .required(false))
        .arg(arg!(--"cache-size" <BYTES> "input cache size, 0 compresses each read").value_parser(clap::value_parser!(usize))
            .required(false))
        .arg(arg!(--immediate "write blocks as soon as they are compressed"))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("png")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-n --iterations <COUNT> "optimizer iterations").value_parser(clap::value_parser!(u32))
            .required(false))
        .arg(arg!(--"keep-chunks" <NAMES> "comma separated ancillary chunks to keep").required(false))
        .about("optimize a PNG file"));

    main_cmd = main_cmd.subcommand(Command::new("checksum")
        .arg(arg!(-a --algorithm <ALG> "checksum algorithm").value_parser(algorithms)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .about("print the checksum of a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let format = match cmd.get_one::<String>("format").expect(RCH).as_str() {
            "gzip" => Format::GZip,
            "zlib" => Format::ZLib,
            "deflate" => Format::Deflate,
            _ => panic!("{}",RCH)
        };
        let mut opt = squeezer::STD_OPTIONS;
        if let Some(n) = cmd.get_one::<u32>("iterations") {
            opt.num_iterations = *n;
        }
        let mut stream_opt = stream::STD_OPTIONS;
        stream_opt.block_type = match cmd.get_one::<String>("block").map(|s| s.as_str()) {
            Some("fixed") => BlockType::Fixed,
            Some("stored") => BlockType::NoCompress,
            _ => BlockType::Dynamic
        };
        if let Some(size) = cmd.get_one::<usize>("cache-size") {
            stream_opt.cache_size = *size;
        }
        stream_opt.write_immediately = cmd.get_flag("immediate");
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::File::create(path_out)?;
        let (in_size,out_size) = squeezer::compress_reader(&mut in_file,&mut out_file,&opt,format,&stream_opt)?;
        eprintln!("compressed {} into {}",in_size,out_size);
    }

    if let Some(cmd) = matches.subcommand_matches("png") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut opt = png::PngOptions::default();
        if let Some(n) = cmd.get_one::<u32>("iterations") {
            opt.num_iterations = *n;
        }
        if let Some(names) = cmd.get_one::<String>("keep-chunks") {
            opt.keep_chunks = names.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let dat = std::fs::read(path_in)?;
        let ans = png::optimize_png(&dat,&opt)?;
        std::fs::write(path_out,&ans)?;
        eprintln!("optimized {} into {}",dat.len(),ans.len());
    }

    if let Some(cmd) = matches.subcommand_matches("checksum") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let mut in_file = std::fs::File::open(path_in)?;
        let mut state = match cmd.get_one::<String>("algorithm").expect(RCH).as_str() {
            "crc32" => checksum::ChecksumState::for_format(Format::GZip),
            "adler32" => checksum::ChecksumState::for_format(Format::ZLib),
            _ => panic!("{}",RCH)
        };
        let mut buf = vec![0;1 << 16];
        loop {
            let n = in_file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            state.update(&buf[..n]);
        }
        println!("{}",hex::encode(state.value().to_be_bytes()));
    }

    Ok(())
}
