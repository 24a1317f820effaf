use crate::error::Error;

// how many leaves go to the left subtree of a tree of `n > 1` leaves
pub fn split(n: usize) -> usize {
	n.next_power_of_two() >> 1
}

// size of the rightmost complete subtree, ie the one a new leaf would pair with
pub fn last_block(n: usize) -> usize {
	1 << n.trailing_zeros()
}

fn check(n: usize, leaf: usize) -> Result<(), Error> {
	if leaf < n {
		Ok(())
	} else {
		Err(Error::IndexOutOfRange {
			index: leaf,
			size: n,
		})
	}
}

// number of edges between the root and `leaf`, which is also its copath length
pub fn leaf_depth(n: usize, leaf: usize) -> Result<usize, Error> {
	check(n, leaf)?;

	let (mut n, mut leaf, mut depth) = (n, leaf, 0);

	while n > 1 {
		let m = split(n);

		if leaf < m {
			n = m;
		} else {
			n -= m;
			leaf -= m;
		}

		depth += 1;
	}

	Ok(depth)
}

// depth of the lowest common ancestor of leaves `i` and `j`, ie the copath slot of `i` that changes
// when `j` rotates its key
pub fn divergence_depth(n: usize, i: usize, j: usize) -> Result<usize, Error> {
	if i == j {
		return Err(Error::EqualIndices(i));
	}

	check(n, i)?;
	check(n, j)?;

	let (mut n, mut i, mut j, mut depth) = (n, i, j, 0);

	loop {
		let m = split(n);

		if i < m && j < m {
			n = m;
		} else if i >= m && j >= m {
			n -= m;
			i -= m;
			j -= m;
		} else {
			return Ok(depth);
		}

		depth += 1;
	}
}
