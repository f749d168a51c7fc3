use std::collections::BTreeSet;

use minesweeper_ai::{
    Agent, BoardSize, Cell, Game, GameConfig, GameState, KnowledgeBase, Minefield, MoveKind,
};
use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rngs::StdRng};

fn cell(row: usize, col: usize) -> Cell {
    Cell::new(row, col)
}

/// A random layout and a random order in which to reveal its safe cells.
fn layout_and_reveals(
    height: usize,
    width: usize,
    density: f64,
    seed: u64,
) -> (Minefield, Vec<Cell>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let size = BoardSize::new(height, width);
    let mines = ((size.area() as f64 * density) as usize).min(size.area() - 1);
    let field = Minefield::random(size, mines, &mut rng).unwrap();

    let mut safe: Vec<Cell> = size.cells().filter(|c| !field.is_mine(*c)).collect();
    safe.shuffle(&mut rng);
    (field, safe)
}

#[test]
fn zero_clue_in_a_corner_marks_its_neighbors_safe_in_one_call() {
    let field = Minefield::from_mines(BoardSize::new(3, 3), [cell(0, 0)]).unwrap();
    let mut agent = Agent::new(field.size());

    agent.add_knowledge(cell(2, 2), field.nearby_mines(cell(2, 2)));

    let expected = BTreeSet::from([cell(1, 1), cell(1, 2), cell(2, 1), cell(2, 2)]);
    assert_eq!(agent.safes(), &expected);
    assert!(agent.mines().is_empty());
}

#[test]
fn zero_clue_opening_leads_to_every_safe_cell() {
    let field = Minefield::from_mines(BoardSize::new(3, 3), [cell(0, 0)]).unwrap();
    let mut agent = Agent::new(field.size());

    agent.add_knowledge(cell(2, 2), 0);
    while let Some(next) = agent.make_safe_move() {
        agent.add_knowledge(next, field.nearby_mines(next));
    }

    let non_mines: BTreeSet<Cell> = field.size().cells().filter(|c| *c != cell(0, 0)).collect();
    assert_eq!(agent.safes(), &non_mines);
    assert_eq!(agent.mines(), &BTreeSet::from([cell(0, 0)]));
}

#[test]
fn clue_equal_to_unresolved_neighbors_marks_them_all_as_mines() {
    let mut agent = Agent::new(BoardSize::new(4, 4));
    agent.add_knowledge(cell(0, 3), 3);

    let expected = BTreeSet::from([cell(0, 2), cell(1, 2), cell(1, 3)]);
    assert_eq!(agent.mines(), &expected);
    assert_eq!(agent.make_safe_move(), None);
}

#[test]
fn one_two_one_pattern() {
    // mines at (0, 0) and (0, 2), the classic 1-2-1 along the bottom row
    let field = Minefield::from_mines(BoardSize::new(2, 3), [cell(0, 0), cell(0, 2)]).unwrap();
    let mut kb = KnowledgeBase::new(field.size());
    for c in [cell(1, 0), cell(1, 1), cell(1, 2)] {
        kb.add_knowledge(c, field.nearby_mines(c).into());
    }

    assert_eq!(kb.mines(), field.mines());
    assert!(kb.safes().contains(&cell(0, 1)));
    assert!(kb.sentences().is_empty());
}

#[test]
fn win_detection_tracks_flagged_mines() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut game = Game::from_config(&GameConfig::new(5, 5, 3), &mut rng).unwrap();
    let state = game.play(&mut rng).unwrap();

    let field = game.field();
    let all_flagged = field.mines_found() == field.mines();
    assert_eq!(field.won(), all_flagged);
    if state == GameState::Won {
        assert!(all_flagged || game.all_safe_revealed());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn deductions_are_sound_and_invariants_hold(
        height in 1usize..7,
        width in 1usize..7,
        density in 0.0f64..0.4,
        seed in any::<u64>(),
        reveals in 1usize..40,
    ) {
        prop_assume!(height * width > 1);
        let (field, order) = layout_and_reveals(height, width, density, seed);
        let mut kb = KnowledgeBase::new(field.size());

        for &c in order.iter().take(reveals) {
            kb.add_knowledge(c, field.nearby_mines(c).into());

            prop_assert!(kb.mines().is_subset(field.mines()));
            prop_assert!(kb.safes().is_disjoint(field.mines()));
            prop_assert!(kb.safes().is_disjoint(kb.mines()));
            prop_assert!(kb.moves_made().is_subset(kb.safes()));
            for sentence in kb.sentences() {
                prop_assert!(sentence.count() <= sentence.cells().len());
                prop_assert!(!sentence.is_empty());
            }
            prop_assert!(kb.check_invariants().is_empty());
        }
    }

    #[test]
    fn safe_moves_never_hit_a_mine(
        height in 2usize..8,
        width in 2usize..8,
        mines in 1usize..10,
        seed in any::<u64>(),
    ) {
        let mines = mines.min(height * width - 1);
        let config = GameConfig::new(height, width, mines).with_seed(seed);
        let mut rng = config.rng();
        let mut game = Game::from_config(&config, &mut rng).unwrap();

        while game.state() == GameState::Playing {
            let step = game.step(&mut rng).unwrap();
            if step.kind == MoveKind::Safe {
                prop_assert!(step.revealed.is_some());
            }
        }
        prop_assert!(game.state() != GameState::Playing);
    }

    #[test]
    fn agent_facts_are_entailed_by_the_clues(
        height in 2usize..6,
        width in 2usize..6,
        seed in any::<u64>(),
    ) {
        let config = GameConfig::new(height, width, (height * width) / 6).with_seed(seed);
        let mut rng = config.rng();
        let mut game = Game::from_config(&config, &mut rng).unwrap();

        while game.state() == GameState::Playing {
            game.step(&mut rng).unwrap();
            if game.state() != GameState::Lost {
                prop_assert!(game.audit().unwrap().is_empty());
            }
        }
    }
}
