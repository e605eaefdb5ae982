// Right-wall follower speaking the Mooshak protocol: commands go out
// on stderr, responses come back on stdin, stdout is free-form log.

use std::io::{self, BufRead};

const DIRS: [&str; 4] = ["NORTH", "EAST", "SOUTH", "WEST"];

fn declare(line: &str) {
    eprintln!("{}", line);
}

fn command(line: &str) -> String {
    eprintln!("{}", line);
    let mut response = String::new();
    io::stdin().lock().read_line(&mut response).unwrap();
    response.trim().to_string()
}

fn main() {
    declare("mouseFile default");
    declare("interfaceType DISCRETE");
    declare("initialDirection NORTH");
    declare("tileTextDimensions 4 2");
    declare("wheelSpeedFraction 1.0");

    let mut dir = 0usize; // index into DIRS, matches initialDirection
    for step in 0..200 {
        if command("wallRight") == "false" {
            dir = (dir + 1) % 4;
            command(&format!("turnTo {}", DIRS[dir]));
        } else if command("wallFront") == "true" {
            dir = (dir + 3) % 4;
            command(&format!("turnTo {}", DIRS[dir]));
            continue;
        }
        if command("moveForward") == "crash" {
            println!("crashed at step {}", step);
            break;
        }
    }
    println!("done");
}
