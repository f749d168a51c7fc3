use minesweeper_ai as ms;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

const STATUS_PLAYING: u8 = 0;
const STATUS_WON: u8 = 1;
const STATUS_LOST: u8 = 2;

fn status(state: ms::GameState) -> u8 {
    match state {
        ms::GameState::Playing => STATUS_PLAYING,
        ms::GameState::Won => STATUS_WON,
        ms::GameState::Lost => STATUS_LOST,
    }
}

fn load(bts: &[u8]) -> Result<ms::Game, String> {
    ms::Game::from_bytes(bts).map_err(|e| e.to_string())
}

fn flatten(cells: &std::collections::BTreeSet<ms::Cell>) -> Vec<u32> {
    cells
        .iter()
        .flat_map(|cell| [cell.row as u32, cell.col as u32])
        .collect()
}

#[wasm_bindgen]
pub fn create_game(height: u8, width: u8, mines: u16, seed: u64) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let config = ms::GameConfig::new(height.into(), width.into(), mines.into()).with_seed(seed);
    let game = ms::Game::from_config(&config, &mut config.rng()).map_err(|e| e.to_string())?;
    game.to_bytes().map_err(|e| e.to_string())
}

/// Plays one agent move. The returned game bytes carry one trailing status
/// byte (0 playing, 1 won, 2 lost) to strip before passing them back.
#[wasm_bindgen]
pub fn step(bts: Vec<u8>, seed: u64) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let step = game.step(&mut rng).map_err(|e| e.to_string())?;
    let mut xs = game.to_bytes().map_err(|e| e.to_string())?;
    xs.push(status(step.state));
    Ok(xs)
}

/// Row-major view of the board: -1 hidden, -2 known mine, otherwise the
/// revealed neighbour count.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    Ok(game
        .field()
        .size()
        .cells()
        .map(|cell| match game.revealed().get(&cell) {
            Some(&n) => n as i8,
            None if game.agent().mines().contains(&cell) => -2,
            None => -1,
        })
        .collect())
}

/// Known safe cells as flattened (row, col) pairs.
#[wasm_bindgen]
pub fn safe_cells(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    let game = load(&bts)?;
    Ok(flatten(game.agent().safes()))
}

/// Known mines as flattened (row, col) pairs.
#[wasm_bindgen]
pub fn mine_cells(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    let game = load(&bts)?;
    Ok(flatten(game.agent().mines()))
}
