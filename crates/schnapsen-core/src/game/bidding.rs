use crate::model::player::{Player, PlayerId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WinningBid {
    pub player: PlayerId,
    pub bid: u32,
}

/// Drains every bid queue round-robin, starting at seat 0.
///
/// The highest non-zero bid wins. An equal bid made later does not displace
/// the earlier bidder. Returns `None` when nobody bid.
pub fn run_auction(players: &mut [Player]) -> Option<WinningBid> {
    let mut best: Option<WinningBid> = None;

    loop {
        let mut any_bid = false;
        for player in players.iter_mut() {
            let Some(bid) = player.next_bid() else {
                continue;
            };
            any_bid = true;
            if bid > 0 && best.is_none_or(|current| bid > current.bid) {
                best = Some(WinningBid {
                    player: player.id(),
                    bid,
                });
            }
        }
        if !any_bid {
            return best;
        }
    }
}
