/*!

This is the long-form manual for `ranked_tally`.

## Counting methods

The engine consumes a candidate list and a collection of ranked ballots and
produces a round-by-round account of the count. Three methods are supported:

* `irv` Instant-Runoff Voting, a single winner
* `stv` Single Transferable Vote, multiple winners against a quota
* `pbv` Preferential Block Voting, multiple winners by repeated runoffs

### `irv`

Each round, every ballot counts toward its highest-ranked candidate still in
the running. A candidate holding more than half of the non-exhausted votes
(`floor(total / 2) + 1`) is elected and the count ends. Otherwise the
candidate with the fewest votes is eliminated and its ballots move to their
next preference. A ballot with no remaining preference is exhausted and
leaves the denominator. A last remaining candidate wins by default.

### `stv`

Seats are filled against the Droop quota, `floor(ballots / (seats + 1)) + 1`,
fixed at the start of the count. A candidate reaching the quota is elected
and keeps exactly the quota; the surplus moves to the next preference of each
of its ballots, every ballot carrying the fraction `surplus / count` of its
weight. Fractions are tracked with 5 decimal places of fixed precision, so
results do not depend on floating-point behavior. When no candidate reaches
the quota the lowest is eliminated at full weight, and when the remaining
hopefuls exactly fill the open seats they are elected by default.

### `pbv`

One full instant-runoff pass per seat. The winner of each pass is removed
from the pool and the next pass reruns from the original ballot weights.
The round history concatenates the passes; `RoundStats::pass` tells them
apart.

## Rules

`TallyRules` controls the count beyond the method and the seat count:

* `tiebreak_mode` — `ByName` (default) breaks elimination ties by the fixed
  lexicographic order of the candidate names, so a count is reproducible
  from its inputs alone. `Random(seed)` permutes the tied candidates by a
  SHA-256 digest of the seed, the round and the name.
* `elimination` — `Single` (default) removes one candidate per round.
  `Batch` additionally removes, in one round, every bottom candidate whose
  cumulative votes cannot catch the candidate above; STV always eliminates
  singly.

## The flow table

[`crate::ballot_flows`] flattens a finished count into aggregated
`(round, source, target, weight)` records, where an endpoint is a candidate
or the exhausted-ballot pool. The edges into a node add up to that node's
tally in the next round, which is exactly the shape a Sankey renderer needs:
label the first and final rounds and draw the links.

 */
