//! Suffix array construction by induced sorting (SA-IS).
//!
//! Linear time and linear extra space. The BWT sorts rotations by building
//! the suffix array of the block concatenated with itself.

const EMPTY: usize = usize::MAX;

/// Build the suffix array of `text`, whose values are all `<= upper`.
///
/// Suffixes are ordered lexicographically with a proper prefix sorting
/// before any longer suffix it prefixes.
pub fn suffix_array<T>(text: &[T], upper: usize) -> Vec<usize>
where
    T: Copy + Into<usize>,
{
    let s: Vec<usize> = text.iter().map(|&c| c.into()).collect();
    sa_is(&s, upper)
}

fn sa_is(s: &[usize], upper: usize) -> Vec<usize> {
    let n = s.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![0],
        2 => return if s[0] < s[1] { vec![0, 1] } else { vec![1, 0] },
        _ => {}
    }

    // true = S-type, false = L-type
    let mut ls = vec![false; n];
    for i in (0..n - 1).rev() {
        ls[i] = if s[i] == s[i + 1] { ls[i + 1] } else { s[i] < s[i + 1] };
    }

    let mut sum_l = vec![0usize; upper + 1];
    let mut sum_s = vec![0usize; upper + 1];
    for i in 0..n {
        if ls[i] {
            if s[i] < upper {
                sum_l[s[i] + 1] += 1;
            }
        } else {
            sum_s[s[i]] += 1;
        }
    }
    for i in 0..=upper {
        sum_s[i] += sum_l[i];
        if i < upper {
            sum_l[i + 1] += sum_s[i];
        }
    }

    let mut sa = vec![EMPTY; n];
    let induce = |sa: &mut [usize], lms: &[usize]| {
        sa.fill(EMPTY);

        let mut buf = sum_s.clone();
        for &d in lms {
            if d == n {
                continue;
            }
            sa[buf[s[d]]] = d;
            buf[s[d]] += 1;
        }

        buf.copy_from_slice(&sum_l);
        sa[buf[s[n - 1]]] = n - 1;
        buf[s[n - 1]] += 1;
        for i in 0..n {
            let v = sa[i];
            if v != EMPTY && v >= 1 && !ls[v - 1] {
                sa[buf[s[v - 1]]] = v - 1;
                buf[s[v - 1]] += 1;
            }
        }

        buf.copy_from_slice(&sum_l);
        for i in (0..n).rev() {
            let v = sa[i];
            if v != EMPTY && v >= 1 && ls[v - 1] {
                buf[s[v - 1] + 1] -= 1;
                sa[buf[s[v - 1] + 1]] = v - 1;
            }
        }
    };

    let mut lms_map = vec![EMPTY; n + 1];
    let mut lms = Vec::new();
    for i in 1..n {
        if !ls[i - 1] && ls[i] {
            lms_map[i] = lms.len();
            lms.push(i);
        }
    }
    let m = lms.len();

    induce(&mut sa, &lms);

    if m > 0 {
        let sorted_lms: Vec<usize> = sa
            .iter()
            .copied()
            .filter(|&v| v != EMPTY && lms_map[v] != EMPTY)
            .collect();

        let mut rec = vec![0usize; m];
        let mut rec_upper = 0;
        for i in 1..m {
            let mut l = sorted_lms[i - 1];
            let mut r = sorted_lms[i];
            let end_l = lms.get(lms_map[l] + 1).copied().unwrap_or(n);
            let end_r = lms.get(lms_map[r] + 1).copied().unwrap_or(n);

            let mut same = true;
            if end_l - l != end_r - r {
                same = false;
            } else {
                while l < end_l {
                    if s[l] != s[r] {
                        break;
                    }
                    l += 1;
                    r += 1;
                }
                if l == n || r == n || s[l] != s[r] {
                    same = false;
                }
            }

            if !same {
                rec_upper += 1;
            }
            rec[lms_map[sorted_lms[i]]] = rec_upper;
        }

        let rec_sa = sa_is(&rec, rec_upper);
        let sorted: Vec<usize> = rec_sa.iter().map(|&i| lms[i]).collect();
        induce(&mut sa, &sorted);
    }

    sa
}
