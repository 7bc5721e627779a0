// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
#[macro_use]
extern crate failure;
extern crate mandelcache;
extern crate num;
extern crate num_cpus;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

use clap::{App, Arg, ArgMatches};
use mandelcache::{
    CacheConfig, CachePair, Canvas, ColorProjection, Interval, SharedCache, WorkerPool,
};
use num::Complex;
use std::fs::File;
use std::io::BufWriter;
use std::str::FromStr;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex { re, im })
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const COLOR: &str = "color";
const ZOOM: &str = "zoom";
const FRAME: &str = "frame";
const LOWFRAME: &str = "lowframe";
const SCALE: &str = "scale";
const DEBUG: &str = "debug";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();
    let max_color = ColorProjection::ALL.len() - 1;

    App::new("mandel")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Renders the Mandelbrot set through a speculative tile cache")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (binary PPM)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("400x300")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse viewport size"))
                .help("Size of the viewport"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .required(false)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .default_value("-2.2,-1.501")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the requested interval"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .required(false)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .default_value("0.8,1.499")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the requested interval"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 200000",
                    )
                })
                .help("Iteration budget of the escape-time test"),
        )
        .arg(
            Arg::with_name(COLOR)
                .required(false)
                .long(COLOR)
                .short("c")
                .takes_value(true)
                .default_value("0")
                .validator(move |s| {
                    validate_range(
                        &s,
                        0,
                        max_color,
                        "Could not parse color projection",
                        &format!("Color projection must be between 0 and {}", max_color),
                    )
                })
                .help("Color projection, by number; 0 is square-root blue, 9 black and white"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("0")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        10_000,
                        "Could not parse zoom step count",
                        "Zoom step count must be between 0 and 10000",
                    )
                })
                .help("Zoom steps toward the center before rendering"),
        )
        .arg(
            Arg::with_name(FRAME)
                .required(false)
                .long(FRAME)
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(&s, 0, 10_000, "Could not parse frame", "Frame must be at most 10000")
                })
                .help("High-priority margin around the viewport, in pixels"),
        )
        .arg(
            Arg::with_name(LOWFRAME)
                .required(false)
                .long(LOWFRAME)
                .takes_value(true)
                .default_value("300")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        10_000,
                        "Could not parse low-priority frame",
                        "Low-priority frame must be at most 10000",
                    )
                })
                .help("Low-priority margin beyond the frame, in pixels"),
        )
        .arg(
            Arg::with_name(SCALE)
                .required(false)
                .long(SCALE)
                .takes_value(true)
                .default_value("2")
                .validator(|s| {
                    validate_range(
                        &s,
                        0.25,
                        8.0,
                        "Could not parse resolution scale",
                        "Resolution scale must be between 0.25 and 8",
                    )
                })
                .help("Render tiles at this multiple of the display resolution"),
        )
        .arg(
            Arg::with_name(DEBUG)
                .long(DEBUG)
                .short("d")
                .help("Draw the whole cache with the camera and native size outlined"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, failure::Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| format_err!("Could not parse --{}", name))
}

fn config(matches: &ArgMatches) -> Result<(CacheConfig, Interval), failure::Error> {
    let (width, height) = matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<u16>(s, 'x'))
        .ok_or_else(|| format_err!("Error parsing viewport dimensions"))?;
    let leftlower = matches
        .value_of(LEFTLOWER)
        .and_then(parse_complex)
        .ok_or_else(|| format_err!("Error parsing left lower point"))?;
    let rightupper = matches
        .value_of(RIGHTUPPER)
        .and_then(parse_complex)
        .ok_or_else(|| format_err!("Error parsing right upper point"))?;
    let color = ColorProjection::from_index(value(matches, COLOR)?)
        .ok_or_else(|| format_err!("Unknown color projection"))?;

    let config = CacheConfig {
        width: u32::from(width),
        height: u32::from(height),
        frame: value(matches, FRAME)?,
        low_priority_frame: value(matches, LOWFRAME)?,
        scale: value(matches, SCALE)?,
        iterations: value(matches, ITERATIONS)?,
        color,
        ..CacheConfig::default()
    };
    let config = if matches.is_present(THREADS) {
        CacheConfig {
            threads: value(matches, THREADS)?,
            ..config
        }
    } else {
        config
    };
    Ok((config, Interval::new(leftlower, rightupper)))
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let (config, interval) = config(matches)?;
    let mut pair = CachePair::new(config, interval)?;

    let steps: usize = value(matches, ZOOM)?;
    for _ in 0..steps {
        let center = pair.current().interval().center();
        let outcome = pair.zoom(center, config.zoom_in_factor())?;
        debug!(?outcome, "zoom step");
    }

    let cache = SharedCache::new(pair);
    let pool = WorkerPool::spawn(&cache, config.threads)?;
    while cache.read()?.current().completeness() < 1.0 {
        thread::sleep(Duration::from_millis(50));
    }
    pool.join();

    let pair = cache.read()?;
    info!("{}", pair.status());

    let mut canvas = Canvas::new(config.width, config.height);
    if matches.is_present(DEBUG) {
        pair.current().draw_debug(&mut canvas, 0, 0, config.width, config.height)?;
    } else {
        pair.current().draw(&mut canvas, 0, 0, config.width, config.height)?;
    }

    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| format_err!("No output file given"))?;
    canvas.write_ppm(BufWriter::new(File::create(output)?))?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
