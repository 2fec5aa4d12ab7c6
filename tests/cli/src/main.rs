use std::env;
use std::process::ExitCode;

fn parse_gids(gids: &str) -> Vec<u16> {
    if gids == "*" {
        return (0..u16::MAX).collect();
    }

    let split = gids.split(',').filter(|s| !s.is_empty()).collect::<Vec<_>>();
    let mut gids = vec![];

    for el in &split {
        if el.contains('-') {
            let range = el.split('-').collect::<Vec<_>>();
            let first = range[0].parse::<u16>().unwrap();
            let second = range[1].parse::<u16>().unwrap();

            gids.extend(first..=second);
        } else {
            gids.push(el.parse::<u16>().unwrap());
        }
    }

    gids
}

// Note that this is more of an experimental CLI used for testing.
fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(input) = args.get(1) else {
        eprintln!("usage: cli <input> [output] [gids]");
        return ExitCode::FAILURE;
    };

    let data = std::fs::read(input).unwrap();
    let face = fontsub::Font::parse(&data, 0).unwrap();
    let mut gids = parse_gids(args.get(3).map_or("*", String::as_str));
    gids.retain(|&gid| gid < face.num_glyphs());

    match fontsub::subset(&data, 0, &gids) {
        Ok((sub, meta)) => {
            println!("{}", meta.base_font);
            println!("retained {} glyphs", meta.retained.len());
            println!("{}", meta.widths);
            std::fs::write(args.get(2).map_or("res.otf", String::as_str), sub).unwrap();
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to subset {input}: {err}");
            ExitCode::FAILURE
        }
    }
}
