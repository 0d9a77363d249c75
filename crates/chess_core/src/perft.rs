use crate::{board::Position, movegen::legal_moves_into, types::Move};

/// Number of leaf nodes in the legal move tree `depth` plies deep.
/// `pos` is unchanged afterwards.
pub fn perft(pos: &mut Position, depth: u8) -> u64 {
    // One move buffer per ply, reused across siblings.
    let mut buffers: Vec<Vec<Move>> = (0..depth).map(|_| Vec::with_capacity(64)).collect();
    count_leaves(pos, &mut buffers)
}

fn count_leaves(pos: &mut Position, buffers: &mut [Vec<Move>]) -> u64 {
    let Some((moves, deeper)) = buffers.split_first_mut() else {
        return 1;
    };
    legal_moves_into(pos, moves);
    if deeper.is_empty() {
        return moves.len() as u64;
    }

    let mut leaves = 0;
    for &mv in moves.iter() {
        let undo = pos.make_move(mv);
        leaves += count_leaves(pos, deeper);
        pos.unmake_move(mv, undo);
    }
    leaves
}
